use taskhive_application::{
    AuditService, AuthorizationService, OrganizationHierarchy, OrganizationService, ScopeService,
    TaskService, UserService,
};

/// Shared service graph for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub authorization: AuthorizationService,
    pub audit: AuditService,
    pub hierarchy: OrganizationHierarchy,
    pub scope: ScopeService,
    pub organizations: OrganizationService,
    pub tasks: TaskService,
    pub users: UserService,
}
