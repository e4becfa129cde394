use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct StopMonitoringResponse {
    pub tenant_id: String,
    pub is_enabled: bool,
    /// Waiting or delayed jobs of the tenant that were dropped. Jobs already
    /// running finish normally.
    pub removed_jobs: usize,
}
