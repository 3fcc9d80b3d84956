//! GET /{endpoint}/id/{id}: round-trip lookup and the unknown-id case.

use super::ScenarioContext;
use crate::error::{ConformanceError, ConformanceResult};
use crate::resource::expect_status;
use crate::transport::Transport;

/// An object created with name N is returned by its id with `Name == N`.
pub async fn get_by_id_valid<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let client = &ctx.client;

    let name = ctx.fresh_name();
    let created = client.create_named(&name).await?;
    expect_status(&created, 200, &format!("POST {{Name: {}}}", name))?;
    let id = client.resolve_created_id(&name, &created).await?;

    let url = client.item_url(id);
    let response = client.get_by_id(id).await?;
    expect_status(&response, 200, &format!("GET {}", url))?;

    let body = response.json(&url)?;
    match body.get("Name").and_then(|n| n.as_str()) {
        Some(returned) if returned == name => Ok(()),
        Some(returned) => Err(ConformanceError::assertion(format!(
            "GET {}: expected Name {:?}, got {:?}",
            url, name, returned
        ))),
        None => Err(ConformanceError::assertion(format!(
            "GET {}: body has no string Name: {}",
            url, body
        ))),
    }
}

/// A sentinel id that no object has yields 404.
pub async fn get_by_id_invalid<T: Transport>(
    ctx: &ScenarioContext<'_, T>,
) -> ConformanceResult<()> {
    let id = ctx.config.missing_id;
    let response = ctx.client.get_by_id(id).await?;
    expect_status(&response, 404, &format!("GET {}", ctx.client.item_url(id)))
}
