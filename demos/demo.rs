use queryhaus::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 QueryHaus Demo\n");

    // In-memory backend so the demo runs without a server
    let transport = MockTransport::new().with_collection(
        "users",
        vec![
            json!({"id": 1, "name": "Ada", "email": "ada@example.com"}),
            json!({"id": 2, "name": "Grace", "email": "grace@example.com"}),
            json!({"id": 3, "name": "Barbara", "email": "barbara@example.com"}),
        ],
    );

    let mut queryhaus = QueryHaus::with_transport(AppConfig::default(), Arc::new(transport.clone()))?;

    queryhaus.signals().add_callback(|event: &CacheEvent| {
        println!("🔔 {:?} {}", event.event_type, event.key);
    })?;

    let users = queryhaus.repository::<User>("users")?;
    queryhaus.register_repository("users".to_string(), users.clone())?;
    println!("✅ Repositories: {:?}", queryhaus.list_repositories());

    // Read a page
    let options = RequestOptions::new().page(0, 2).order_by("name", SortOrder::Asc);
    let mut page = users.fetch_page(&options);
    let result = page.settled().await;
    if let Some(list) = &result.data {
        println!("📄 Page 0: {} of {} users, more: {}", list.len(), list.total, list.has_more());
    }

    // Warm the next page in the background
    users.prefetch_next_page(&options).await;

    // A second read of the same key is served from the cache
    let cached = users.fetch_page(&options);
    println!("⚡ Cached read fetching: {}", cached.result().is_fetching);

    // Create and watch the page refetch
    let created = users
        .create::<serde_json::Value>()
        .mutate_async(json!({"name": "Alan", "email": "alan@example.com"}))
        .await?;
    println!("➕ Created: {:?}", created);

    let refreshed = page.settled().await;
    println!(
        "🔄 Total after create: {}",
        refreshed.data.map(|list| list.total).unwrap_or_default()
    );

    // Delete one user
    users.delete().mutate_async("2".to_string()).await?;
    println!("🗑️  Requests sent: {}", transport.requests().len());

    Ok(())
}
