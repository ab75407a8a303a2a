use error::{PostError, Result};
use model::{NewPost, Post, PostPatch};

/// Ordered, in-memory collection of posts.
///
/// Posts are kept in insertion order; updates happen in place and never move a post.
#[derive(Clone, Debug)]
pub struct Database {
    posts: Vec<Post>,
}

impl Database {
    #[cfg(test)]
    pub fn new() -> Database {
        Database { posts: vec![] }
    }

    pub fn with_posts(posts: Vec<Post>) -> Database {
        Database { posts: posts }
    }

    /// The collection every fresh process starts with.
    pub fn seeded() -> Database {
        Database::with_posts(vec![
            Post::new(1, "neVer", "never say NEvER."),
            Post::new(2, "Something is Cooking", "...not food related."),
            Post::new(3, "NOT you", "i like you."),
            Post::new(4, "NADA", "i am, you are, we are."),
        ])
    }

    pub fn posts(&self) -> &Vec<Post> {
        &self.posts
    }

    /// One more than the current maximum id, or 1 for an empty collection.
    /// Ids are not remembered after deletion, so deleting the maximum lets
    /// the next create hand it out again.
    fn next_id(&self) -> u64 {
        self.posts.iter().map(Post::id).max().map_or(1, |max| max + 1)
    }

    pub fn create(&mut self, new_post: NewPost) -> Result<Post> {
        let mut missing = vec![];
        if new_post.title.is_none() {
            missing.push("title");
        }
        if new_post.content.is_none() {
            missing.push("content");
        }

        match (new_post.title, new_post.content) {
            (Some(title), Some(content)) => {
                let post = Post::new(self.next_id(), &title, &content);
                debug!("created post {}", post.id());
                self.posts.push(post.clone());
                Ok(post)
            }
            _ => Err(PostError::Validation(missing)),
        }
    }

    pub fn get(&self, id: u64) -> Result<&Post> {
        self.posts
            .iter()
            .find(|post| post.id() == id)
            .ok_or(PostError::NotFound(id))
    }

    pub fn update(&mut self, id: u64, patch: PostPatch) -> Result<Post> {
        let post = self.posts
            .iter_mut()
            .find(|post| post.id() == id)
            .ok_or(PostError::NotFound(id))?;
        post.apply(patch);
        debug!("updated post {}", id);
        Ok(post.clone())
    }

    pub fn delete(&mut self, id: u64) -> Result<Post> {
        let position = self.posts
            .iter()
            .position(|post| post.id() == id)
            .ok_or(PostError::NotFound(id))?;
        debug!("deleted post {}", id);
        Ok(self.posts.remove(position))
    }

    /// Posts whose title contains `title` or whose content contains `content`,
    /// ignoring case. An absent or empty query matches nothing on its field.
    pub fn search(&self, title: Option<&str>, content: Option<&str>) -> Vec<Post> {
        let title = title.filter(|q| !q.is_empty()).map(str::to_lowercase);
        let content = content.filter(|q| !q.is_empty()).map(str::to_lowercase);

        self.posts
            .iter()
            .filter(|post| {
                title.as_ref().map_or(false, |q| post.title().to_lowercase().contains(q.as_str()))
                    || content.as_ref().map_or(false, |q| post.content().to_lowercase().contains(q.as_str()))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_post(title: &str, content: &str) -> NewPost {
        NewPost {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
        }
    }

    fn ids(posts: &[Post]) -> Vec<u64> {
        posts.iter().map(Post::id).collect()
    }

    #[test]
    fn create_on_empty_store_starts_at_one() {
        let mut database = Database::new();
        let post = database.create(new_post("A", "B")).unwrap();
        assert_eq!(post, Post::new(1, "A", "B"));
    }

    #[test]
    fn create_appends_with_max_plus_one() {
        let mut database = Database::with_posts(vec![Post::new(7, "a", "b"), Post::new(3, "c", "d")]);
        let post = database.create(new_post("e", "f")).unwrap();

        assert_eq!(post.id(), 8);
        assert_eq!(database.posts().len(), 3);
        assert_eq!(database.posts().last(), Some(&post));
    }

    #[test]
    fn create_reports_all_missing_fields() {
        let mut database = Database::seeded();
        let err = database.create(NewPost::default()).unwrap_err();

        assert_eq!(err, PostError::Validation(vec!["title", "content"]));
        assert_eq!(database.posts().len(), 4);
    }

    #[test]
    fn create_reports_single_missing_field() {
        let mut database = Database::new();
        let err = database
            .create(NewPost {
                title: Some("only a title".to_string()),
                content: None,
            })
            .unwrap_err();
        assert_eq!(err, PostError::Validation(vec!["content"]));
        assert!(database.posts().is_empty());
    }

    #[test]
    fn create_keeps_values_verbatim() {
        let mut database = Database::new();
        let post = database.create(new_post("  spaced  ", "")).unwrap();
        assert_eq!(post.title(), "  spaced  ");
        assert_eq!(post.content(), "");
    }

    #[test]
    fn deleted_gap_is_not_refilled() {
        let mut database = Database::seeded();
        database.delete(2).unwrap();
        let post = database.create(new_post("x", "y")).unwrap();
        assert_eq!(post.id(), 5);
    }

    #[test]
    fn deleting_the_maximum_lets_its_id_come_back() {
        let mut database = Database::seeded();
        database.delete(4).unwrap();
        let post = database.create(new_post("x", "y")).unwrap();
        assert_eq!(post.id(), 4);
    }

    #[test]
    fn get_finds_by_id() {
        let database = Database::seeded();
        assert_eq!(database.get(3).unwrap().title(), "NOT you");
        assert_eq!(database.get(9), Err(PostError::NotFound(9)));
    }

    #[test]
    fn update_is_partial_and_in_place() {
        let mut database = Database::seeded();
        let updated = database
            .update(
                2,
                PostPatch {
                    title: None,
                    content: Some("food related after all".to_string()),
                },
            )
            .unwrap();

        assert_eq!(updated, Post::new(2, "Something is Cooking", "food related after all"));
        assert_eq!(ids(database.posts()), vec![1, 2, 3, 4]);
        assert_eq!(database.posts()[1], updated);
    }

    #[test]
    fn empty_patch_changes_nothing() {
        let mut database = Database::seeded();
        let before = database.get(1).unwrap().clone();
        let after = database.update(1, PostPatch::default()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut database = Database::seeded();
        let err = database.update(99, PostPatch::default()).unwrap_err();
        assert_eq!(err, PostError::NotFound(99));
    }

    #[test]
    fn delete_removes_exactly_one() {
        let mut database = Database::seeded();
        let removed = database.delete(3).unwrap();

        assert_eq!(removed.id(), 3);
        assert_eq!(ids(database.posts()), vec![1, 2, 4]);
    }

    #[test]
    fn delete_unknown_id_leaves_store_unchanged() {
        let mut database = Database::seeded();
        assert_eq!(database.delete(99), Err(PostError::NotFound(99)));
        assert_eq!(database.posts().len(), 4);
    }

    #[test]
    fn search_title_is_case_insensitive() {
        let database = Database::seeded();
        let found = database.search(Some("NEVER"), None);
        assert_eq!(ids(&found), vec![1]);
    }

    #[test]
    fn search_is_an_or_across_fields() {
        let database = Database::seeded();
        // "nada" only matches post 4's title, "like" only post 3's content.
        let found = database.search(Some("nada"), Some("LIKE"));
        assert_eq!(ids(&found), vec![3, 4]);
    }

    #[test]
    fn search_content_preserves_order() {
        let database = Database::seeded();
        let found = database.search(None, Some("you"));
        assert_eq!(ids(&found), vec![3, 4]);
    }

    #[test]
    fn search_without_queries_is_empty() {
        let database = Database::seeded();
        assert!(database.search(None, None).is_empty());
        assert!(database.search(Some(""), Some("")).is_empty());
    }

    #[test]
    fn empty_title_query_does_not_match_everything() {
        let database = Database::seeded();
        let found = database.search(Some(""), Some("food"));
        assert_eq!(ids(&found), vec![2]);
    }
}
