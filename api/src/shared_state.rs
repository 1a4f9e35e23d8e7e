use std::sync::Arc;

use roster_db::Pool;

pub struct InnerState {
    pub db: Pool,
}

pub type State = Arc<InnerState>;
