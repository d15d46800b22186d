mod hr;

use async_graphql::{EmptySubscription, Object, Schema, SimpleObject};
use platform_api::ApiResult;
use products_hr::HrModule;
use serde::Serialize;
use tracing::instrument;

pub use hr::{HrMutation, HrQuery};

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(hr: HrModule) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(hr)
        .finish()
}

#[derive(Default)]
pub struct QueryRoot;

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> ApiResult<HealthPayload> {
        Ok(HealthPayload { ok: true })
    }

    #[instrument(name = "graphql.version", skip_all)]
    async fn version(&self) -> ApiResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    async fn hr(&self) -> HrQuery {
        HrQuery
    }
}

#[Object]
impl MutationRoot {
    async fn hr(&self) -> HrMutation {
        HrMutation
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}
