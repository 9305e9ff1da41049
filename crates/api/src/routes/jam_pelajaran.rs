use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/jam-pelajaran/template/default",
            get(handlers::jam_pelajaran::get_default_template),
        )
        .route(
            "/jam-pelajaran/copy",
            post(handlers::jam_pelajaran::copy_periods),
        )
        .route(
            "/jam-pelajaran/:kelas_id",
            get(handlers::jam_pelajaran::get_periods)
                .post(handlers::jam_pelajaran::upsert_periods)
                .delete(handlers::jam_pelajaran::delete_periods),
        )
}
