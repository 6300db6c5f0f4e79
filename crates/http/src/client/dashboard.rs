//! Dashboard summary

use super::ApiClient;
use super::error::ClientError;
use super::resources::Resource;
use crate::types::DashboardStats;
use tracing::warn;

impl ApiClient {
    /// Count projects, employees and equipment concurrently
    ///
    /// A collection that cannot be read counts as zero. An invalidated
    /// session is still reported, since the user has to log in again.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        let projects = self.resource(Resource::Projects);
        let employees = self.resource(Resource::Employees);
        let equipment = self.resource(Resource::Equipment);
        let (projects, employees, equipment) =
            futures::join!(projects.count(), employees.count(), equipment.count());

        Ok(DashboardStats {
            projects: count_or_zero(Resource::Projects, projects)?,
            employees: count_or_zero(Resource::Employees, employees)?,
            equipment: count_or_zero(Resource::Equipment, equipment)?,
        })
    }
}

fn count_or_zero(resource: Resource, result: Result<u64, ClientError>) -> Result<u64, ClientError> {
    match result {
        Ok(count) => Ok(count),
        Err(e) if e.is_session_invalidated() => Err(e),
        Err(e) => {
            warn!(%resource, "Failed to count records: {e}");
            Ok(0)
        }
    }
}
