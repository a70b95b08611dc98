pub mod redaction_compositor;
pub mod track_aggregator;
