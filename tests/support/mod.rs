//! In-memory repository stubs shared by the integration tests.

use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicI64, Ordering},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;

use kalem::application::repos::{
    AdminUsersRepo, CreatePostParams, PostFilter, PostListPage, PostListRequest, PostSort,
    PostsRepo, PostsWriteRepo, RepoError, TagCount,
};
use kalem::domain::posts::{AdminUser, Post};

pub fn sample_post(id: i64, slug: &str, title: &str) -> Post {
    Post {
        id,
        slug: slug.to_string(),
        title: title.to_string(),
        excerpt: format!("{title} üzerine kısa bir özet"),
        content: format!("<p>{title}</p>"),
        author: "Ayşe".to_string(),
        publish_date: time::Date::from_ordinal_date(2024, id.clamp(1, 300) as u16).expect("date"),
        read_time: 5,
        tags: vec!["genel".to_string()],
        thumbnail: String::new(),
        featured: false,
        meta_title: None,
        meta_description: None,
        meta_keywords: None,
        canonical_url: None,
        og_title: None,
        og_description: None,
        og_image: None,
        twitter_title: None,
        twitter_description: None,
        twitter_image: None,
        created_at: datetime!(2024-01-01 00:00 UTC),
        updated_at: datetime!(2024-01-01 00:00 UTC),
    }
}

/// Posts repository backed by a `Vec`, mirroring the SQL adapter's filter,
/// sort and pagination semantics.
#[derive(Default)]
pub struct InMemoryPosts {
    posts: Mutex<Vec<Post>>,
    next_id: AtomicI64,
    pub fail_listing: AtomicBool,
}

impl InMemoryPosts {
    pub fn with_posts(posts: Vec<Post>) -> Self {
        let next_id = posts.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        Self {
            posts: Mutex::new(posts),
            next_id: AtomicI64::new(next_id),
            fail_listing: AtomicBool::new(false),
        }
    }

    fn snapshot(&self) -> Vec<Post> {
        self.posts.lock().expect("lock").clone()
    }

    fn check_failure(&self) -> Result<(), RepoError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("listing disabled".to_string()));
        }
        Ok(())
    }
}

fn matches_filter(post: &Post, filter: &PostFilter) -> bool {
    if let Some(tag) = &filter.tag {
        if !post.tags.iter().any(|t| t == tag) {
            return false;
        }
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let haystacks = [&post.title, &post.excerpt, &post.author];
        let in_fields = haystacks
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        let in_tags = post.tags.iter().any(|t| t.to_lowercase().contains(&needle));
        if !in_fields && !in_tags {
            return false;
        }
    }
    if let Some(featured) = filter.featured {
        if post.featured != featured {
            return false;
        }
    }
    true
}

fn sort_posts(posts: &mut [Post], sort: PostSort) {
    match sort {
        PostSort::Newest => posts.sort_by(|a, b| {
            b.publish_date
                .cmp(&a.publish_date)
                .then(b.id.cmp(&a.id))
        }),
        PostSort::Oldest => posts.sort_by(|a, b| {
            a.publish_date
                .cmp(&b.publish_date)
                .then(a.id.cmp(&b.id))
        }),
        PostSort::Popular => posts.sort_by(|a, b| {
            b.read_time
                .cmp(&a.read_time)
                .then(b.publish_date.cmp(&a.publish_date))
                .then(b.id.cmp(&a.id))
        }),
    }
}

#[async_trait]
impl PostsRepo for InMemoryPosts {
    async fn list_posts(&self, request: &PostListRequest) -> Result<PostListPage, RepoError> {
        self.check_failure()?;
        let mut posts: Vec<Post> = self
            .snapshot()
            .into_iter()
            .filter(|post| matches_filter(post, &request.filter))
            .collect();
        sort_posts(&mut posts, request.sort);

        let total_count = posts.len() as u64;
        let items = posts
            .into_iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .collect();

        Ok(PostListPage { items, total_count })
    }

    async fn list_all_posts(&self) -> Result<Vec<Post>, RepoError> {
        self.check_failure()?;
        let mut posts = self.snapshot();
        sort_posts(&mut posts, PostSort::Newest);
        Ok(posts)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        Ok(self.snapshot().into_iter().find(|post| post.slug == slug))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.snapshot().into_iter().find(|post| post.id == id))
    }

    async fn list_related(
        &self,
        post_id: i64,
        author: &str,
        tags: &[String],
        limit: u32,
    ) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .snapshot()
            .into_iter()
            .filter(|post| {
                post.id != post_id
                    && (post.author == author || post.tags.iter().any(|t| tags.contains(t)))
            })
            .collect();
        sort_posts(&mut posts, PostSort::Newest);
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn list_latest_excluding(
        &self,
        exclude: &[i64],
        limit: u32,
    ) -> Result<Vec<Post>, RepoError> {
        let mut posts: Vec<Post> = self
            .snapshot()
            .into_iter()
            .filter(|post| !exclude.contains(&post.id))
            .collect();
        sort_posts(&mut posts, PostSort::Newest);
        posts.truncate(limit as usize);
        Ok(posts)
    }

    async fn list_tag_counts(&self) -> Result<Vec<TagCount>, RepoError> {
        let mut counts: Vec<TagCount> = Vec::new();
        for post in self.snapshot() {
            for tag in post.tags {
                match counts.iter_mut().find(|c| c.name == tag) {
                    Some(entry) => entry.count += 1,
                    None => counts.push(TagCount {
                        name: tag,
                        count: 1,
                    }),
                }
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.name.cmp(&b.name)));
        Ok(counts)
    }
}

#[async_trait]
impl PostsWriteRepo for InMemoryPosts {
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError> {
        let mut posts = self.posts.lock().expect("lock");
        if posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }

        let now = OffsetDateTime::now_utc();
        let post = Post {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            slug: params.slug,
            title: params.title,
            excerpt: params.excerpt,
            content: params.content,
            author: params.author,
            publish_date: params.publish_date,
            read_time: params.read_time,
            tags: params.tags,
            thumbnail: params.thumbnail,
            featured: params.featured,
            meta_title: params.meta_title,
            meta_description: params.meta_description,
            meta_keywords: params.meta_keywords,
            canonical_url: params.canonical_url,
            og_title: params.og_title,
            og_description: params.og_description,
            og_image: params.og_image,
            twitter_title: params.twitter_title,
            twitter_description: params.twitter_description,
            twitter_image: params.twitter_image,
            created_at: now,
            updated_at: now,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, post: &Post) -> Result<Post, RepoError> {
        let mut posts = self.posts.lock().expect("lock");
        if posts
            .iter()
            .any(|other| other.id != post.id && other.slug == post.slug)
        {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }
        let slot = posts
            .iter_mut()
            .find(|other| other.id == post.id)
            .ok_or(RepoError::NotFound)?;
        let mut updated = post.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut posts = self.posts.lock().expect("lock");
        let before = posts.len();
        posts.retain(|post| post.id != id);
        if posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// Single fixed admin account.
pub struct SingleAdmin {
    pub user: AdminUser,
}

impl SingleAdmin {
    pub fn with_password_hash(password_hash: String) -> Self {
        Self {
            user: AdminUser {
                id: 1,
                username: "editor".to_string(),
                email: None,
                password_hash,
                is_active: true,
                last_login: None,
            },
        }
    }
}

#[async_trait]
impl AdminUsersRepo for SingleAdmin {
    async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<AdminUser>, RepoError> {
        Ok((username == self.user.username).then(|| self.user.clone()))
    }

    async fn record_login(&self, _id: i64) -> Result<(), RepoError> {
        Ok(())
    }
}
