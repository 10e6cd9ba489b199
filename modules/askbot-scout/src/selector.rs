use askbot_common::Post;

/// Which candidate posts are worth answering.
#[derive(Debug, Clone, PartialEq)]
pub enum PostFilter {
    /// Keep everything.
    Any,
    /// `score >= n`. Posts without a score are dropped.
    MinScore(i64),
    /// Title starts with the given prefix (case-sensitive).
    TitlePrefix(String),
    /// Every inner filter must match.
    All(Vec<PostFilter>),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::Any => true,
            PostFilter::MinScore(min) => post.score.is_some_and(|score| score >= *min),
            PostFilter::TitlePrefix(prefix) => post.title.starts_with(prefix.as_str()),
            PostFilter::All(filters) => filters.iter().all(|f| f.matches(post)),
        }
    }
}

/// Keep the posts matching `predicate`, preserving input order.
pub fn select<P>(posts: Vec<Post>, predicate: P) -> Vec<Post>
where
    P: Fn(&Post) -> bool,
{
    posts.into_iter().filter(|post| predicate(post)).collect()
}
