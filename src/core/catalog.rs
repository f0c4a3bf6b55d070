//! Catalog business logic - articles (crypto projects) and their tasks.
//!
//! Deleting is soft: rows stay so that plan entries and point history keep their
//! references, but deleted articles and tasks are hidden from listings and lookups.

use crate::{
    config::catalog::Config,
    entities::{Article, Task, TaskFrequency, article, task},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Creates a new article.
pub async fn create_article<C>(
    db: &C,
    title: &str,
    description: &str,
    url: Option<String>,
    now: DateTime<Utc>,
) -> Result<article::Model>
where
    C: ConnectionTrait,
{
    if title.trim().is_empty() {
        return Err(Error::Config {
            message: "Article title cannot be empty".to_string(),
        });
    }

    let model = article::ActiveModel {
        title: Set(title.trim().to_string()),
        description: Set(description.trim().to_string()),
        url: Set(url),
        is_deleted: Set(false),
        created_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Creates a task under an existing, non-deleted article.
pub async fn create_task<C>(
    db: &C,
    article_id: i64,
    title: &str,
    frequency: TaskFrequency,
    now: DateTime<Utc>,
) -> Result<task::Model>
where
    C: ConnectionTrait,
{
    if title.trim().is_empty() {
        return Err(Error::Config {
            message: "Task title cannot be empty".to_string(),
        });
    }

    let parent = Article::find_by_id(article_id).one(db).await?;
    if !parent.is_some_and(|a| !a.is_deleted) {
        return Err(Error::ArticleNotFound { article_id });
    }

    let model = task::ActiveModel {
        article_id: Set(article_id),
        title: Set(title.trim().to_string()),
        frequency: Set(frequency),
        is_deleted: Set(false),
        created_at: Set(now),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// All active articles, alphabetically.
pub async fn list_articles(db: &DatabaseConnection) -> Result<Vec<article::Model>> {
    Article::find()
        .filter(article::Column::IsDeleted.eq(false))
        .order_by_asc(article::Column::Title)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All active tasks of an article, alphabetically.
pub async fn list_tasks_for_article(
    db: &DatabaseConnection,
    article_id: i64,
) -> Result<Vec<task::Model>> {
    Task::find()
        .filter(task::Column::ArticleId.eq(article_id))
        .filter(task::Column::IsDeleted.eq(false))
        .order_by_asc(task::Column::Title)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All active tasks, alphabetically.
pub async fn list_all_tasks(db: &DatabaseConnection) -> Result<Vec<task::Model>> {
    Task::find()
        .filter(task::Column::IsDeleted.eq(false))
        .order_by_asc(task::Column::Title)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an active task by id.
pub async fn get_task_by_id(db: &DatabaseConnection, task_id: i64) -> Result<Option<task::Model>> {
    Ok(Task::find_by_id(task_id)
        .one(db)
        .await?
        .filter(|t| !t.is_deleted))
}

/// Finds an active task by exact title.
pub async fn find_task_by_title(
    db: &DatabaseConnection,
    title: &str,
) -> Result<Option<task::Model>> {
    Task::find()
        .filter(task::Column::Title.eq(title.trim()))
        .filter(task::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active article by exact title.
pub async fn find_article_by_title(
    db: &DatabaseConnection,
    title: &str,
) -> Result<Option<article::Model>> {
    Article::find()
        .filter(article::Column::Title.eq(title.trim()))
        .filter(article::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Soft deletes an article together with its tasks.
pub async fn soft_delete_article(db: &DatabaseConnection, article_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Article::find_by_id(article_id)
        .one(&txn)
        .await?
        .ok_or(Error::ArticleNotFound { article_id })?;

    let mut active: article::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.update(&txn).await?;

    Task::update_many()
        .col_expr(task::Column::IsDeleted, Expr::value(true))
        .filter(task::Column::ArticleId.eq(article_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(())
}

/// Soft deletes a single task.
pub async fn soft_delete_task(db: &DatabaseConnection, task_id: i64) -> Result<()> {
    let existing = Task::find_by_id(task_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::TaskNotFound {
            task_id: task_id.to_string(),
        })?;

    let mut active: task::ActiveModel = existing.into();
    active.is_deleted = Set(true);
    active.update(db).await?;
    Ok(())
}

/// Seeds articles and tasks from config.toml, skipping titles that already exist.
///
/// # Returns
/// Number of articles and tasks created
pub async fn seed_catalog(
    db: &DatabaseConnection,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<(usize, usize)> {
    let txn = db.begin().await?;
    let mut articles_created = 0;
    let mut tasks_created = 0;

    for article_config in &config.articles {
        let existing = Article::find()
            .filter(article::Column::Title.eq(article_config.title.trim()))
            .filter(article::Column::IsDeleted.eq(false))
            .one(&txn)
            .await?;

        let parent = if let Some(existing) = existing {
            existing
        } else {
            articles_created += 1;
            create_article(
                &txn,
                &article_config.title,
                &article_config.description,
                article_config.url.clone(),
                now,
            )
            .await?
        };

        for task_config in &article_config.tasks {
            let task_exists = Task::find()
                .filter(task::Column::ArticleId.eq(parent.id))
                .filter(task::Column::Title.eq(task_config.title.trim()))
                .filter(task::Column::IsDeleted.eq(false))
                .one(&txn)
                .await?
                .is_some();

            if !task_exists {
                create_task(&txn, parent.id, &task_config.title, task_config.frequency, now)
                    .await?;
                tasks_created += 1;
            }
        }
    }

    txn.commit().await?;
    info!(articles_created, tasks_created, "Catalog seeded");
    Ok((articles_created, tasks_created))
}
