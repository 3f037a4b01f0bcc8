use async_trait::async_trait;
use sqlx::{FromRow, QueryBuilder, Postgres};
use time::{Date, OffsetDateTime};

use crate::application::repos::{
    CreatePostParams, PostFilter, PostListPage, PostListRequest, PostSort, PostsRepo,
    PostsWriteRepo, RepoError, TagCount,
};
use crate::domain::posts::Post;

use super::{PostgresRepositories, map_sqlx_error};

const POST_COLUMNS: &str = "id, slug, title, excerpt, content, author, publish_date, read_time, \
     tags, thumbnail, featured, meta_title, meta_description, meta_keywords, canonical_url, \
     og_title, og_description, og_image, twitter_title, twitter_description, twitter_image, \
     created_at, updated_at";

#[derive(Debug, FromRow)]
struct PostRow {
    id: i64,
    slug: String,
    title: String,
    excerpt: String,
    content: String,
    author: String,
    publish_date: Date,
    read_time: i32,
    tags: Vec<String>,
    thumbnail: String,
    featured: bool,
    meta_title: Option<String>,
    meta_description: Option<String>,
    meta_keywords: Option<Vec<String>>,
    canonical_url: Option<String>,
    og_title: Option<String>,
    og_description: Option<String>,
    og_image: Option<String>,
    twitter_title: Option<String>,
    twitter_description: Option<String>,
    twitter_image: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            slug: row.slug,
            title: row.title,
            excerpt: row.excerpt,
            content: row.content,
            author: row.author,
            publish_date: row.publish_date,
            read_time: row.read_time,
            tags: row.tags,
            thumbnail: row.thumbnail,
            featured: row.featured,
            meta_title: row.meta_title,
            meta_description: row.meta_description,
            meta_keywords: row.meta_keywords,
            canonical_url: row.canonical_url,
            og_title: row.og_title,
            og_description: row.og_description,
            og_image: row.og_image,
            twitter_title: row.twitter_title,
            twitter_description: row.twitter_description,
            twitter_image: row.twitter_image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Escape LIKE wildcards so user-supplied search text matches literally.
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("%{escaped}%")
}

fn apply_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    if let Some(tag) = &filter.tag {
        qb.push(" AND ");
        qb.push_bind(tag.clone());
        qb.push(" = ANY(tags)");
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR excerpt ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR author ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR EXISTS (SELECT 1 FROM unnest(tags) AS t(tag) WHERE t.tag ILIKE ");
        qb.push_bind(pattern);
        qb.push("))");
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND featured = ");
        qb.push_bind(featured);
    }
}

fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: PostSort) {
    match sort {
        PostSort::Newest => qb.push(" ORDER BY publish_date DESC, id DESC"),
        PostSort::Oldest => qb.push(" ORDER BY publish_date ASC, id ASC"),
        PostSort::Popular => qb.push(" ORDER BY read_time DESC, publish_date DESC, id DESC"),
    };
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self, request: &PostListRequest) -> Result<PostListPage, RepoError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM posts WHERE 1=1");
        apply_filter(&mut count_qb, &request.filter);
        let total_count: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let mut qb = QueryBuilder::new(format!("SELECT {POST_COLUMNS} FROM posts WHERE 1=1"));
        apply_filter(&mut qb, &request.filter);
        push_order_by(&mut qb, request.sort);
        qb.push(" OFFSET ");
        qb.push_bind(request.offset as i64);
        qb.push(" LIMIT ");
        qb.push_bind(i64::from(request.limit));

        let rows: Vec<PostRow> = qb
            .build_query_as()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostListPage {
            items: rows.into_iter().map(Post::from).collect(),
            total_count: total_count.max(0) as u64,
        })
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>, RepoError> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY publish_date DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let row: Option<PostRow> =
            sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(Post::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let row: Option<PostRow> =
            sqlx::query_as(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(Post::from))
    }

    async fn list_related(
        &self,
        post_id: i64,
        author: &str,
        tags: &[String],
        limit: u32,
    ) -> Result<Vec<Post>, RepoError> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE id <> $1 AND (author = $2 OR tags && $3) \
             ORDER BY publish_date DESC, id DESC LIMIT $4"
        ))
        .bind(post_id)
        .bind(author)
        .bind(tags)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_latest_excluding(
        &self,
        exclude: &[i64],
        limit: u32,
    ) -> Result<Vec<Post>, RepoError> {
        let rows: Vec<PostRow> = sqlx::query_as(&format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE id <> ALL($1) \
             ORDER BY publish_date DESC, id DESC LIMIT $2"
        ))
        .bind(exclude)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn list_tag_counts(&self) -> Result<Vec<TagCount>, RepoError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT t.tag, COUNT(*) AS count FROM posts \
             CROSS JOIN LATERAL unnest(tags) AS t(tag) \
             GROUP BY t.tag ORDER BY count DESC, t.tag ASC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(name, count)| TagCount {
                name,
                count: count.max(0) as u64,
            })
            .collect())
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError> {
        let row: PostRow = sqlx::query_as(&format!(
            "INSERT INTO posts (\
                 slug, title, excerpt, content, author, publish_date, read_time, \
                 tags, thumbnail, featured, meta_title, meta_description, meta_keywords, \
                 canonical_url, og_title, og_description, og_image, \
                 twitter_title, twitter_description, twitter_image\
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20) \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(&params.slug)
        .bind(&params.title)
        .bind(&params.excerpt)
        .bind(&params.content)
        .bind(&params.author)
        .bind(params.publish_date)
        .bind(params.read_time)
        .bind(&params.tags)
        .bind(&params.thumbnail)
        .bind(params.featured)
        .bind(&params.meta_title)
        .bind(&params.meta_description)
        .bind(&params.meta_keywords)
        .bind(&params.canonical_url)
        .bind(&params.og_title)
        .bind(&params.og_description)
        .bind(&params.og_image)
        .bind(&params.twitter_title)
        .bind(&params.twitter_description)
        .bind(&params.twitter_image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(Post::from(row))
    }

    async fn update_post(&self, post: &Post) -> Result<Post, RepoError> {
        let row: PostRow = sqlx::query_as(&format!(
            "UPDATE posts SET \
                 slug = $2, title = $3, excerpt = $4, content = $5, author = $6, \
                 publish_date = $7, read_time = $8, tags = $9, thumbnail = $10, featured = $11, \
                 meta_title = $12, meta_description = $13, meta_keywords = $14, \
                 canonical_url = $15, og_title = $16, og_description = $17, og_image = $18, \
                 twitter_title = $19, twitter_description = $20, twitter_image = $21, \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        ))
        .bind(post.id)
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.author)
        .bind(post.publish_date)
        .bind(post.read_time)
        .bind(&post.tags)
        .bind(&post.thumbnail)
        .bind(post.featured)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(&post.meta_keywords)
        .bind(&post.canonical_url)
        .bind(&post.og_title)
        .bind(&post.og_description)
        .bind(&post.og_image)
        .bind(&post.twitter_title)
        .bind(&post.twitter_description)
        .bind(&post.twitter_image)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(Post::from(row))
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a%b_c\\d"), "%a\\%b\\_c\\\\d%");
        assert_eq!(like_pattern("şehir"), "%şehir%");
    }
}
