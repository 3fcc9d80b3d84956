//! POST /{endpoint}: creation and its validation rules.
//!
//! The count oracle is read fresh before and after each mutation; it is
//! never tracked locally.

use serde_json::json;

use super::ScenarioContext;
use crate::error::ConformanceResult;
use crate::resource::{expect_body_text, expect_count, expect_status};
use crate::transport::Transport;

/// A single create succeeds and adds exactly one object.
pub async fn create_one<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let client = &ctx.client;
    let before = client.total_count().await?;

    let name = ctx.fresh_name();
    let response = client.create_named(&name).await?;
    expect_status(&response, 200, &format!("POST {} {{Name: {}}}", client.collection_url(), name))?;

    let after = client.total_count().await?;
    expect_count(before, 1, after, "after one create")
}

/// Two creates with distinct names both succeed and add exactly two objects.
pub async fn create_two<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let client = &ctx.client;
    let before = client.total_count().await?;

    for ordinal in ["first", "second"] {
        let name = ctx.fresh_name();
        let response = client.create_named(&name).await?;
        expect_status(
            &response,
            200,
            &format!("{} POST {} {{Name: {}}}", ordinal, client.collection_url(), name),
        )?;
    }

    let after = client.total_count().await?;
    expect_count(before, 2, after, "after two creates")
}

/// Reusing a name is rejected with 400 and the duplicate message, and the
/// rejected create leaves no trace.
pub async fn duplicate_name_rejected<T: Transport>(
    ctx: &ScenarioContext<'_, T>,
) -> ConformanceResult<()> {
    let client = &ctx.client;
    let before = client.total_count().await?;

    let name = ctx.fresh_name();
    let first = client.create_named(&name).await?;
    expect_status(&first, 200, &format!("first POST {{Name: {}}}", name))?;

    let second = client.create_named(&name).await?;
    let what = format!("duplicate POST {{Name: {}}}", name);
    expect_status(&second, 400, &what)?;
    expect_body_text(&second, &ctx.config.duplicate_message, &what)?;

    let after = client.total_count().await?;
    expect_count(before, 1, after, "after a create and a rejected duplicate")
}

/// A body without `Name` is rejected with 400 and the invalid-request message.
pub async fn missing_name_rejected<T: Transport>(
    ctx: &ScenarioContext<'_, T>,
) -> ConformanceResult<()> {
    let client = &ctx.client;
    let before = client.total_count().await?;

    let name = ctx.fresh_name();
    let response = client.create(json!({ "Name1": name })).await?;
    let what = format!("POST {} {{Name1: {}}}", client.collection_url(), name);
    expect_status(&response, 400, &what)?;
    expect_body_text(&response, &ctx.config.invalid_message, &what)?;

    let after = client.total_count().await?;
    expect_count(before, 0, after, "after a create without Name")
}
