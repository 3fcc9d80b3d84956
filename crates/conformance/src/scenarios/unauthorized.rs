//! Requests without an `Authorization` header are refused with 401 on every verb.
//!
//! Each probe uses the verb its title names: POST sends a generated body
//! and DELETE targets the configured probe id.

use super::ScenarioContext;
use crate::error::ConformanceResult;
use crate::resource::expect_status;
use crate::transport::Transport;

pub async fn list<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let anonymous = ctx.client.anonymous();
    let response = anonymous.list().await?;
    expect_status(
        &response,
        401,
        &format!("GET {} without credential", anonymous.collection_url()),
    )
}

pub async fn get_by_id<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let anonymous = ctx.client.anonymous();
    let id = ctx.config.probe_id;
    let response = anonymous.get_by_id(id).await?;
    expect_status(
        &response,
        401,
        &format!("GET {} without credential", anonymous.item_url(id)),
    )
}

pub async fn create<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let anonymous = ctx.client.anonymous();
    let name = ctx.fresh_name();
    let response = anonymous.create_named(&name).await?;
    expect_status(
        &response,
        401,
        &format!("POST {} without credential", anonymous.collection_url()),
    )
}

pub async fn delete<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let anonymous = ctx.client.anonymous();
    let id = ctx.config.probe_id;
    let response = anonymous.delete_by_id(id).await?;
    expect_status(
        &response,
        401,
        &format!("DELETE {} without credential", anonymous.item_url(id)),
    )
}
