//! GET /{endpoint}: every listed object is exactly `{Id: number, Name: string}`.

use super::ScenarioContext;
use crate::error::{ConformanceError, ConformanceResult};
use crate::resource::check_object_shape;
use crate::transport::Transport;

pub async fn list_all<T: Transport>(ctx: &ScenarioContext<'_, T>) -> ConformanceResult<()> {
    let objects = ctx.client.fetch_all().await?;

    for (index, object) in objects.iter().enumerate() {
        check_object_shape(object).map_err(|problem| {
            ConformanceError::assertion(format!(
                "GET {}: object #{} {}: {}",
                ctx.client.collection_url(),
                index,
                object,
                problem
            ))
        })?;
    }
    Ok(())
}
