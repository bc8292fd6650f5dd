//! Basic example demonstrating the ServiceNow API client.
//!
//! Run with:
//! ```
//! NOW_INSTANCE_URL=https://dev1.service-now.com NOW_USERNAME=admin NOW_PASSWORD=secret \
//!     cargo run --example basic
//! ```

use nowapi::{
    AttachmentApi, AttachmentListParams, DisplayValue, NowClient, TableApi, TableListParams,
    DEFAULT_TABLE_URL,
};

#[tokio::main]
async fn main() -> nowapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating ServiceNow client...");
    let client = NowClient::from_env(DEFAULT_TABLE_URL)?;
    println!("Connected to: {} ({:?})", client.base_url(), client.auth_mode());

    let table = TableApi::from_client(&client)?;

    // List the five newest active incidents
    println!("\n--- Active Incidents ---");
    let params = TableListParams {
        sysparm_query: Some("active=true^ORDERBYDESCsys_created_on".to_string()),
        sysparm_fields: Some("sys_id,number,short_description,priority".to_string()),
        sysparm_display_value: Some(DisplayValue::True),
        sysparm_limit: Some(5),
        ..Default::default()
    };
    let incidents = table
        .get_records("incident", &params)
        .await?
        .into_result()?
        .unwrap_or_default();
    println!("Found {} incidents", incidents.len());

    for incident in &incidents {
        println!(
            "  - {} [P{}] {}",
            incident.value("number").unwrap_or("?"),
            incident.value("priority").unwrap_or("?"),
            incident.value("short_description").unwrap_or("")
        );
    }

    // Show the attachments of the first incident
    if let Some(first) = incidents.first() {
        println!("\n--- Attachments of {} ---", first.sys_id);
        let attachments = AttachmentApi::from_client(&client)?;
        let list = attachments
            .get_records(&AttachmentListParams {
                sysparm_query: Some(format!("table_sys_id={}", first.sys_id)),
                ..Default::default()
            })
            .await?
            .into_result()?
            .unwrap_or_default();

        for attachment in &list {
            println!(
                "  - {} ({} bytes)",
                attachment.file_name,
                attachment.size_bytes.unwrap_or(0)
            );
        }
    }

    println!("\nDone!");
    Ok(())
}
