//! DELETE /{endpoint}/id/{id}: existence flips from present to absent exactly once.

use super::ScenarioContext;
use crate::error::ConformanceResult;
use crate::resource::expect_status;
use crate::transport::Transport;

/// GET 200, DELETE 200, GET 404 on an object this scenario created itself.
pub async fn delete_valid<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let client = &ctx.client;

    let name = ctx.fresh_name();
    let created = client.create_named(&name).await?;
    expect_status(&created, 200, &format!("POST {{Name: {}}}", name))?;
    let id = client.resolve_created_id(&name, &created).await?;
    let url = client.item_url(id);

    let present = client.get_by_id(id).await?;
    expect_status(&present, 200, &format!("GET {} before delete", url))?;

    let deleted = client.delete_by_id(id).await?;
    expect_status(&deleted, 200, &format!("DELETE {}", url))?;

    let absent = client.get_by_id(id).await?;
    expect_status(&absent, 404, &format!("GET {} after delete", url))
}

/// Deleting a sentinel id that no object has yields 404.
pub async fn delete_invalid<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let id = ctx.config.missing_id;
    let response = ctx.client.delete_by_id(id).await?;
    expect_status(&response, 404, &format!("DELETE {}", ctx.client.item_url(id)))
}
