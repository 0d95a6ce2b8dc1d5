use std::collections::HashMap;

use async_trait::async_trait;
use shared::{
    domain::{RecordId, UserId},
    error::ApiResult,
    protocol::{
        BatchRequest, HostContext, MemberProfile, Record, RecordRow, RecordStatusUpdate, RowPage,
    },
};

/// The record-store collaborator the orchestrator layer talks to.
///
/// The engine never constructs a concrete transport; the host injects one.
/// Every operation resolves to `Ok(payload)` or a `ClientError`, and the
/// engine only ever inspects `ClientError::is_not_found`.
#[async_trait]
pub trait RecordStoreClient: Send + Sync {
    async fn get_context(&self) -> ApiResult<HostContext>;

    async fn get_localized_strings(&self) -> ApiResult<HashMap<String, String>>;

    async fn get_record(&self, record_id: &RecordId) -> ApiResult<Record>;

    async fn get_record_rows(
        &self,
        record_id: &RecordId,
        continuation_token: Option<&str>,
        page_size: u32,
    ) -> ApiResult<RowPage>;

    async fn get_member_profiles(&self, user_ids: &[UserId]) -> ApiResult<Vec<MemberProfile>>;

    async fn update_record_status(&self, update: RecordStatusUpdate) -> ApiResult<()>;

    async fn update_record(&self, record: Record) -> ApiResult<()>;

    async fn delete_record(&self, record_id: &RecordId) -> ApiResult<()>;

    async fn add_or_update_rows(
        &self,
        add_rows: Vec<RecordRow>,
        update_rows: Vec<RecordRow>,
    ) -> ApiResult<()>;

    async fn download_rows_as_csv(&self, record_id: &RecordId, filename: &str) -> ApiResult<()>;

    /// Executes several requests as one call; record creation plus its
    /// initial rows go through here.
    async fn batch_execute(&self, requests: Vec<BatchRequest>) -> ApiResult<()>;

    async fn close_host_surface(&self) -> ApiResult<()>;

    async fn hide_loading_indicator(&self) -> ApiResult<()>;
}
