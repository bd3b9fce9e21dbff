use std::sync::Arc;

use escrow_messaging::MessagingClient;
use escrow_notifier::Notifier;
use escrow_service::EscrowService;
use escrow_store::Store;

/// Shared state handed to every handler, mirroring the teacher RPC server's
/// `RpcServerState` shape: one `Arc` bundle, cloned cheaply per request.
pub struct AppState {
    pub store: Arc<Store>,
    pub service: Arc<EscrowService>,
    pub messaging: Arc<dyn MessagingClient>,
    pub notifier: Arc<Notifier>,
}
