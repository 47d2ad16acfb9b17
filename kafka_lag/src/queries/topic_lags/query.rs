#[derive(Debug, Clone)]
pub struct GetTopicLagsQuery {
    pub group: String,
    pub topics: Vec<String>,
}
