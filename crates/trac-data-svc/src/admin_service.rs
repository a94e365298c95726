//! `TracAdminApi` implementation: tenant and dynamic-config CRUD. Tenants
//! are normally created once at deploy time; this in-memory registry backs
//! that bootstrap step for `tracd`'s dev/test configuration the same way
//! `InMemoryMetadataDal` stands in for a real database.

use std::collections::BTreeMap;
use std::sync::RwLock;

use tonic::{Request, Response, Status};
use tracing::instrument;

use trac_proto::admin as p;
use trac_proto::admin::trac_admin_api_server::TracAdminApi;

pub struct AdminService {
    tenants: RwLock<BTreeMap<String, p::Tenant>>,
    config: RwLock<BTreeMap<(String, String), String>>,
}

impl Default for AdminService {
    fn default() -> Self {
        AdminService { tenants: RwLock::new(BTreeMap::new()), config: RwLock::new(BTreeMap::new()) }
    }
}

impl AdminService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a tenant at construction time, for bootstrap config (tenants
    /// have both bootstrap and dynamic entries).
    pub fn with_bootstrap_tenants(tenants: impl IntoIterator<Item = p::Tenant>) -> Self {
        let svc = Self::default();
        let mut guard = svc.tenants.write().unwrap();
        for tenant in tenants {
            guard.insert(tenant.tenant_code.clone(), tenant);
        }
        drop(guard);
        svc
    }

    pub fn tenant_exists(&self, tenant_code: &str) -> bool {
        self.tenants.read().unwrap().contains_key(tenant_code)
    }
}

#[tonic::async_trait]
impl TracAdminApi for AdminService {
    #[instrument(skip(self, request))]
    async fn create_tenant(&self, request: Request<p::CreateTenantRequest>) -> Result<Response<p::Tenant>, Status> {
        let tenant = request
            .into_inner()
            .tenant
            .ok_or_else(|| Status::invalid_argument("tenant is required"))?;
        if tenant.tenant_code.trim().is_empty() {
            return Err(Status::invalid_argument("tenant_code must not be empty"));
        }

        let mut guard = self.tenants.write().unwrap();
        if guard.contains_key(&tenant.tenant_code) {
            return Err(Status::already_exists(format!("tenant '{}' already exists", tenant.tenant_code)));
        }
        guard.insert(tenant.tenant_code.clone(), tenant.clone());
        Ok(Response::new(tenant))
    }

    #[instrument(skip(self, _request))]
    async fn list_tenants(&self, _request: Request<p::ListTenantsRequest>) -> Result<Response<p::ListTenantsResponse>, Status> {
        let tenants = self.tenants.read().unwrap().values().cloned().collect();
        Ok(Response::new(p::ListTenantsResponse { tenants }))
    }

    #[instrument(skip(self, request))]
    async fn set_config(&self, request: Request<p::SetConfigRequest>) -> Result<Response<p::ConfigEntry>, Status> {
        let entry = request
            .into_inner()
            .entry
            .ok_or_else(|| Status::invalid_argument("entry is required"))?;
        if !self.tenant_exists(&entry.tenant) {
            return Err(Status::not_found(format!("tenant '{}' not found", entry.tenant)));
        }
        self.config
            .write()
            .unwrap()
            .insert((entry.tenant.clone(), entry.config_key.clone()), entry.config_value.clone());
        Ok(Response::new(entry))
    }

    #[instrument(skip(self, request))]
    async fn get_config(&self, request: Request<p::GetConfigRequest>) -> Result<Response<p::ConfigEntry>, Status> {
        let req = request.into_inner();
        let value = self
            .config
            .read()
            .unwrap()
            .get(&(req.tenant.clone(), req.config_key.clone()))
            .cloned()
            .ok_or_else(|| Status::not_found(format!("config key '{}' not found for tenant '{}'", req.config_key, req.tenant)))?;
        Ok(Response::new(p::ConfigEntry { tenant: req.tenant, config_key: req.config_key, config_value: value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(code: &str) -> p::Tenant {
        p::Tenant { tenant_code: code.to_string(), description: format!("{code} tenant") }
    }

    #[tokio::test]
    async fn create_tenant_then_list_round_trips() {
        let svc = AdminService::new();
        svc.create_tenant(Request::new(p::CreateTenantRequest { tenant: Some(tenant("acme")) }))
            .await
            .unwrap();

        let list = svc.list_tenants(Request::new(p::ListTenantsRequest {})).await.unwrap().into_inner();
        assert_eq!(list.tenants.len(), 1);
        assert_eq!(list.tenants[0].tenant_code, "acme");
    }

    #[tokio::test]
    async fn duplicate_tenant_is_already_exists() {
        let svc = AdminService::new();
        svc.create_tenant(Request::new(p::CreateTenantRequest { tenant: Some(tenant("acme")) }))
            .await
            .unwrap();
        let err = svc
            .create_tenant(Request::new(p::CreateTenantRequest { tenant: Some(tenant("acme")) }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::AlreadyExists);
    }

    #[tokio::test]
    async fn config_for_unknown_tenant_is_not_found() {
        let svc = AdminService::new();
        let err = svc
            .set_config(Request::new(p::SetConfigRequest {
                entry: Some(p::ConfigEntry { tenant: "ghost".into(), config_key: "k".into(), config_value: "v".into() }),
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::NotFound);
    }

    #[tokio::test]
    async fn set_then_get_config_round_trips() {
        let svc = AdminService::new();
        svc.create_tenant(Request::new(p::CreateTenantRequest { tenant: Some(tenant("acme")) }))
            .await
            .unwrap();
        svc.set_config(Request::new(p::SetConfigRequest {
            entry: Some(p::ConfigEntry { tenant: "acme".into(), config_key: "k".into(), config_value: "v".into() }),
        }))
        .await
        .unwrap();

        let entry = svc
            .get_config(Request::new(p::GetConfigRequest { tenant: "acme".into(), config_key: "k".into() }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(entry.config_value, "v");
    }
}
