//! Integration tests for the QueryHaus coordinator
//!
//! Tests configuration handling and the repository registry.

use queryhaus::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
}

fn coordinator() -> QueryHaus {
    QueryHaus::with_transport(AppConfig::default(), Arc::new(MockTransport::new()))
        .expect("default config is valid")
}

#[test]
fn test_new_with_http_transport() {
    let config = AppConfig::from_toml_str(
        r#"
        [transport]
        base_url = "http://localhost:4000/api"
        timeout_ms = 5000
        total_count_header = "X-Count"

        [cache]
        stale_time_ms = 1000
        gc_time_ms = 2000
        "#,
    )
    .expect("valid toml");

    let queryhaus = QueryHaus::new(config).expect("http transport builds");
    assert_eq!(queryhaus.config().transport.total_count_header, "X-Count");
    assert_eq!(
        queryhaus.cache().params().stale_time,
        std::time::Duration::from_secs(1)
    );
    assert_eq!(
        queryhaus.client().default_options().gc_time,
        std::time::Duration::from_secs(2)
    );

    let posts = queryhaus.repository::<Post>("posts").expect("valid entity");
    assert_eq!(posts.entity(), "posts");
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = AppConfig::default();
    config.transport.base_url = "localhost:3000".to_string();

    let error = QueryHaus::new(config).expect_err("missing scheme");
    assert!(matches!(error, QueryHausError::Config(ConfigError::Invalid(_))));
}

#[test]
fn test_invalid_entity_name_is_rejected() {
    let queryhaus = coordinator();

    let error = queryhaus
        .repository::<Post>("posts; drop")
        .expect_err("invalid characters");
    assert!(matches!(
        error,
        QueryHausError::Repository(RepositoryError::InvalidEntityName(_))
    ));
}

#[test]
fn test_repository_registry() {
    let mut queryhaus = coordinator();
    let posts = queryhaus.repository::<Post>("posts").expect("valid entity");
    let comments = queryhaus.repository::<Comment>("comments").expect("valid entity");

    queryhaus
        .register_repository("posts".to_string(), posts.clone())
        .expect("registered");
    queryhaus
        .register_repository("comments".to_string(), comments)
        .expect("registered");

    let duplicate = queryhaus.register_repository("posts".to_string(), posts);
    assert!(matches!(
        duplicate,
        Err(QueryHausError::RepositoryAlreadyRegistered(name)) if name == "posts"
    ));

    assert_eq!(
        queryhaus.list_repositories(),
        vec![&"comments".to_string(), &"posts".to_string()]
    );

    let found = queryhaus
        .get_repository::<Repository<Post>>("posts")
        .expect("registered as posts");
    assert_eq!(found.entity(), "posts");

    // Wrong model type does not downcast
    assert!(matches!(
        queryhaus.get_repository::<Repository<Comment>>("posts"),
        Err(QueryHausError::RepositoryNotFound(_))
    ));

    queryhaus.unregister_repository("posts").expect("removed");
    assert!(queryhaus.unregister_repository("posts").is_err());
    assert_eq!(queryhaus.list_repositories(), vec![&"comments".to_string()]);
}

#[tokio::test]
async fn test_repositories_share_one_cache() {
    let transport = MockTransport::new().with_collection(
        "posts",
        vec![serde_json::json!({"id": 1, "title": "Hello"})],
    );
    let queryhaus =
        QueryHaus::with_transport(AppConfig::default(), Arc::new(transport.clone())).expect("valid");

    let first = queryhaus.repository::<Post>("posts").expect("valid entity");
    let second = queryhaus.repository::<Post>("posts").expect("valid entity");

    let mut a = first.fetch_by_id("1");
    let mut b = second.fetch_by_id("1");
    a.settled().await;
    b.settled().await;

    assert_eq!(transport.request_count(Method::Get, "/posts/1"), 1);
    assert_eq!(queryhaus.cache().len(), 1);
}
