#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Post {
    id: u64,
    title: String,
    content: String,
}

impl Post {
    pub fn new(id: u64, title: &str, content: &str) -> Post {
        Post {
            id: id,
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Overwrite the fields present in `patch`, leave the others alone.
    pub fn apply(&mut self, patch: PostPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
    }
}

/// Body of a create request. Both fields are required, but they are
/// decoded as optional so that every missing one can be reported at once.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct NewPost {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of an update request. An absent field means "keep the stored value".
/// Unknown keys, including `id`, are ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}
