//! Basic usage example for vaultsubst
//!
//! Reads `VAULT_ADDR` and `VAULT_TOKEN` (or `~/.vault-token`) and expects a
//! KV v2 secret at `kv/storage/postgres/creds` with `username` and
//! `password` fields.

use vaultsubst::{Client, ClientBuilder, KvVersion, Patcher, SecretRef};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the client
    let client = ClientBuilder::from_env()?.user_agent_extra("basic-usage").build()?;
    println!("Using Vault at {}", client.address());

    // Example 1: Resolve a single reference
    println!("=== Example 1: Resolve a reference ===");
    resolve_example(&client).await?;

    // Example 2: Build a reference in code
    println!("\n=== Example 2: Typed reference ===");
    typed_reference_example(&client).await?;

    // Example 3: Patch a whole buffer
    println!("\n=== Example 3: Patch a buffer ===");
    patch_example(&client).await?;

    Ok(())
}

async fn resolve_example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    let user = client
        .resolve("path=kv/storage/postgres/creds,field=username,transform=trim|upper")
        .await?;
    println!("username: {}", user);
    Ok(())
}

async fn typed_reference_example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    let reference = SecretRef::new("kv/storage/postgres/creds", "password")
        .with_version(KvVersion::V2)
        .with_transformation("base64");
    println!("reference: {}", reference);

    let encoded = reference.fetch(client).await?;
    println!("password (base64): {} characters", encoded.len());
    Ok(())
}

async fn patch_example(client: &Client) -> Result<(), Box<dyn std::error::Error>> {
    let template = "\
[database]
user = \"@@path=kv/storage/postgres/creds,field=username@@\"
password = \"@@path=kv/storage/postgres/creds,field=password@@\"
";

    let patcher = Patcher::new(vaultsubst::DEFAULT_DELIMITER)?;
    println!("tokens: {}", patcher.tokens(template).len());

    let rendered = patcher.patch(template, client).await?;
    println!("rendered {} bytes", rendered.len());
    Ok(())
}
