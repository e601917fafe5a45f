mod admin_guard;
mod job_signature;
mod session;
mod store_connection;

pub use admin_guard::{AdminGuardFactory, AdminGuardService, NOT_AUTHORIZED};
pub use job_signature::{
    sign_job_request,
    JobSignatureFactory,
    JobSignatureService,
    JobSigningKey,
    JOB_SIGNATURE_HEADER,
};
pub use session::{SessionClaims, SessionMiddlewareFactory, SessionMiddlewareService, SessionVerifier, SESSION_COOKIE};
pub use store_connection::{StoreConnectionFactory, StoreConnectionService};
