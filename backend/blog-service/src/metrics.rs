//! Prometheus metrics for blog-service.
//!
//! Collectors register with the default registry on first use; `/metrics`
//! renders them in text format.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Posts written, segmented by operation (create/update).
    pub static ref POST_WRITES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_post_writes_total",
        "Posts created or updated",
        &["operation"]
    )
    .expect("failed to register blog_post_writes_total");

    /// Reaction toggles segmented by requested reaction.
    pub static ref REACTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "blog_reactions_total",
        "Like/dislike toggles",
        &["reaction"]
    )
    .expect("failed to register blog_reactions_total");

    /// Signup codes issued.
    pub static ref OTP_ISSUED_TOTAL: IntCounter = register_int_counter!(
        "blog_otp_issued_total",
        "One-time signup codes issued"
    )
    .expect("failed to register blog_otp_issued_total");

    /// Uploaded objects left unreferenced after a failed post write.
    pub static ref ORPHANED_MEDIA_TOTAL: IntCounter = register_int_counter!(
        "blog_orphaned_media_total",
        "Uploaded images not referenced by any post"
    )
    .expect("failed to register blog_orphaned_media_total");
}

/// Touch every collector so they show up before their first event
pub fn init_metrics() {
    lazy_static::initialize(&POST_WRITES_TOTAL);
    lazy_static::initialize(&REACTIONS_TOTAL);
    lazy_static::initialize(&OTP_ISSUED_TOTAL);
    lazy_static::initialize(&ORPHANED_MEDIA_TOTAL);
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
