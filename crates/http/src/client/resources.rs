//! REST collections exposed by the ERP API
//!
//! Every collection follows the same router layout: `<slug>/` lists and
//! creates, `<slug>/<id>/` reads, replaces, patches and deletes. Payloads are
//! passed through as JSON; field validation belongs to the server.

use super::error::ClientError;
use super::request::ApiRequest;
use super::{ApiClient, decode};
use crate::types::Listing;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// A REST collection of the ERP API
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    // Project management
    Projects,
    Tasks,
    Milestones,
    Documents,
    ProjectTeam,
    // Procurement
    Suppliers,
    PurchaseRequests,
    PurchaseOrders,
    PurchaseOrderItems,
    // Inventory
    InventoryItems,
    StockMovements,
    Materials,
    Warehouses,
    Stocks,
    // Finance
    Invoices,
    Expenses,
    Payments,
    Budgets,
    // Human resources
    Employees,
    Attendance,
    Payroll,
    Leaves,
    // Equipment
    Equipment,
    EquipmentAssignments,
    EquipmentMaintenance,
    // Site management
    Sites,
    DailyLogs,
    SiteInspections,
    SafetyRecords,
    // Reporting
    Reports,
}

impl Resource {
    pub const ALL: [Self; 30] = [
        Self::Projects,
        Self::Tasks,
        Self::Milestones,
        Self::Documents,
        Self::ProjectTeam,
        Self::Suppliers,
        Self::PurchaseRequests,
        Self::PurchaseOrders,
        Self::PurchaseOrderItems,
        Self::InventoryItems,
        Self::StockMovements,
        Self::Materials,
        Self::Warehouses,
        Self::Stocks,
        Self::Invoices,
        Self::Expenses,
        Self::Payments,
        Self::Budgets,
        Self::Employees,
        Self::Attendance,
        Self::Payroll,
        Self::Leaves,
        Self::Equipment,
        Self::EquipmentAssignments,
        Self::EquipmentMaintenance,
        Self::Sites,
        Self::DailyLogs,
        Self::SiteInspections,
        Self::SafetyRecords,
        Self::Reports,
    ];

    /// URL slug of the collection
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Projects => "projects",
            Self::Tasks => "tasks",
            Self::Milestones => "milestones",
            Self::Documents => "documents",
            Self::ProjectTeam => "project-team",
            Self::Suppliers => "suppliers",
            Self::PurchaseRequests => "purchase-requests",
            Self::PurchaseOrders => "purchase-orders",
            Self::PurchaseOrderItems => "purchase-order-items",
            Self::InventoryItems => "inventory-items",
            Self::StockMovements => "stock-movements",
            Self::Materials => "materials",
            Self::Warehouses => "warehouses",
            Self::Stocks => "stocks",
            Self::Invoices => "invoices",
            Self::Expenses => "expenses",
            Self::Payments => "payments",
            Self::Budgets => "budgets",
            Self::Employees => "employees",
            Self::Attendance => "attendance",
            Self::Payroll => "payroll",
            Self::Leaves => "leaves",
            Self::Equipment => "equipment",
            Self::EquipmentAssignments => "equipment-assignments",
            Self::EquipmentMaintenance => "equipment-maintenance",
            Self::Sites => "sites",
            Self::DailyLogs => "daily-logs",
            Self::SiteInspections => "site-inspections",
            Self::SafetyRecords => "safety-records",
            Self::Reports => "reports",
        }
    }

    /// Path of the collection
    pub fn collection_path(self) -> String {
        format!("{}/", self.slug())
    }

    /// Path of a single record
    pub fn item_path(self, id: impl fmt::Display) -> String {
        format!("{}/{id}/", self.slug())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Resource {
    type Err = ClientError;

    /// Accepts the slug, with or without slashes, or its snake_case spelling
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim_matches('/').replace('_', "-").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|resource| resource.slug() == normalized)
            .ok_or_else(|| ClientError::Configuration(format!("unknown resource {s:?}")))
    }
}

/// CRUD operations on one collection
#[derive(Clone, Copy)]
pub struct ResourceApi<'a> {
    client: &'a ApiClient,
    resource: Resource,
}

impl ApiClient {
    /// Operations on `resource`
    pub fn resource(&self, resource: Resource) -> ResourceApi<'_> {
        ResourceApi {
            client: self,
            resource,
        }
    }
}

impl ResourceApi<'_> {
    pub fn resource(&self) -> Resource {
        self.resource
    }

    /// List the collection's first page
    pub async fn list<T: DeserializeOwned>(&self) -> Result<Listing<T>, ClientError> {
        self.client.get(&self.resource.collection_path()).await
    }

    /// List a specific page of a paginated collection
    pub async fn list_page<T: DeserializeOwned>(
        &self,
        page: u32,
    ) -> Result<Listing<T>, ClientError> {
        let request =
            ApiRequest::get(self.resource.collection_path()).query("page", page.to_string());
        self.client.execute(&request).await
    }

    /// Count the records of the collection
    pub async fn count(&self) -> Result<u64, ClientError> {
        Ok(self.list::<JsonValue>().await?.total())
    }

    /// Fetch one record
    pub async fn get<T: DeserializeOwned>(&self, id: impl fmt::Display) -> Result<T, ClientError> {
        self.client.get(&self.resource.item_path(id)).await
    }

    /// Create a record
    pub async fn create<T, B>(&self, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.client.post(&self.resource.collection_path(), body).await
    }

    /// Replace a record
    pub async fn update<T, B>(&self, id: impl fmt::Display, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.client.put(&self.resource.item_path(id), body).await
    }

    /// Change some fields of a record
    pub async fn patch<T, B>(&self, id: impl fmt::Display, body: &B) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.client.patch(&self.resource.item_path(id), body).await
    }

    /// Delete a record
    pub async fn delete(&self, id: impl fmt::Display) -> Result<(), ClientError> {
        self.client.delete(&self.resource.item_path(id)).await
    }

    /// Follow a `next` link returned by a paginated listing
    pub async fn next_page<T: DeserializeOwned>(
        &self,
        listing: &Listing<T>,
    ) -> Result<Option<Listing<T>>, ClientError> {
        let Some(next) = listing.next_page() else {
            return Ok(None);
        };
        let response = self.client.send(&ApiRequest::get(next)).await?;
        Ok(Some(decode(response).await?))
    }
}
