use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ── videos ──
        manager
            .create_table(
                Table::create()
                    .table(Videos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Videos::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Videos::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Videos::Title).string().not_null())
                    .col(ColumnDef::new(Videos::Description).text().not_null())
                    .col(ColumnDef::new(Videos::VideoUrl).string().not_null())
                    .col(ColumnDef::new(Videos::VideoKey).string().not_null())
                    .col(ColumnDef::new(Videos::ThumbnailUrl).string().not_null())
                    .col(ColumnDef::new(Videos::ThumbnailKey).string().not_null())
                    .col(
                        ColumnDef::new(Videos::Duration)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Videos::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Videos::IsPublished)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Videos::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Videos::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_videos_owner")
                    .table(Videos::Table)
                    .col(Videos::OwnerId)
                    .to_owned(),
            )
            .await?;

        // ── comments ──
        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::VideoId).uuid().not_null())
                    .col(ColumnDef::new(Comments::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(ColumnDef::new(Comments::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Comments::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_video")
                    .table(Comments::Table)
                    .col(Comments::VideoId)
                    .to_owned(),
            )
            .await?;

        // ── tweets ──
        manager
            .create_table(
                Table::create()
                    .table(Tweets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tweets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tweets::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Tweets::Content).text().not_null())
                    .col(ColumnDef::new(Tweets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Tweets::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // ── likes ──
        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Likes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Likes::LikedBy).uuid().not_null())
                    .col(ColumnDef::new(Likes::VideoId).uuid().null())
                    .col(ColumnDef::new(Likes::CommentId).uuid().null())
                    .col(ColumnDef::new(Likes::TweetId).uuid().null())
                    .col(ColumnDef::new(Likes::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // One like per (user, target); NULL targets never collide.
        for (name, target) in [
            ("idx_likes_video_unique", Likes::VideoId),
            ("idx_likes_comment_unique", Likes::CommentId),
            ("idx_likes_tweet_unique", Likes::TweetId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Likes::Table)
                        .col(Likes::LikedBy)
                        .col(target)
                        .unique()
                        .to_owned(),
                )
                .await?;
        }

        // ── subscriptions ──
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::SubscriberId).uuid().not_null())
                    .col(ColumnDef::new(Subscriptions::ChannelId).uuid().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_subscriptions_unique")
                    .table(Subscriptions::Table)
                    .col(Subscriptions::SubscriberId)
                    .col(Subscriptions::ChannelId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ── playlists ──
        manager
            .create_table(
                Table::create()
                    .table(Playlists::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Playlists::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Playlists::OwnerId).uuid().not_null())
                    .col(ColumnDef::new(Playlists::Name).string().not_null())
                    .col(ColumnDef::new(Playlists::Description).text().not_null())
                    .col(ColumnDef::new(Playlists::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Playlists::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlaylistVideos::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlaylistVideos::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlaylistVideos::PlaylistId).uuid().not_null())
                    .col(ColumnDef::new(PlaylistVideos::VideoId).uuid().not_null())
                    .col(ColumnDef::new(PlaylistVideos::AddedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_playlist_videos_unique")
                    .table(PlaylistVideos::Table)
                    .col(PlaylistVideos::PlaylistId)
                    .col(PlaylistVideos::VideoId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ── watch_history ──
        manager
            .create_table(
                Table::create()
                    .table(WatchHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WatchHistory::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WatchHistory::UserId).uuid().not_null())
                    .col(ColumnDef::new(WatchHistory::VideoId).uuid().not_null())
                    .col(
                        ColumnDef::new(WatchHistory::WatchedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watch_history_user")
                    .table(WatchHistory::Table)
                    .col(WatchHistory::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WatchHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlaylistVideos::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Playlists::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Likes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tweets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Videos::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(Iden)]
enum Videos {
    Table,
    Id,
    OwnerId,
    Title,
    Description,
    VideoUrl,
    VideoKey,
    ThumbnailUrl,
    ThumbnailKey,
    Duration,
    Views,
    IsPublished,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Comments {
    Table,
    Id,
    VideoId,
    OwnerId,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Tweets {
    Table,
    Id,
    OwnerId,
    Content,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden, Clone, Copy)]
enum Likes {
    Table,
    Id,
    LikedBy,
    VideoId,
    CommentId,
    TweetId,
    CreatedAt,
}

#[derive(Iden)]
enum Subscriptions {
    Table,
    Id,
    SubscriberId,
    ChannelId,
    CreatedAt,
}

#[derive(Iden)]
enum Playlists {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum PlaylistVideos {
    Table,
    Id,
    PlaylistId,
    VideoId,
    AddedAt,
}

#[derive(Iden)]
enum WatchHistory {
    Table,
    Id,
    UserId,
    VideoId,
    WatchedAt,
}
