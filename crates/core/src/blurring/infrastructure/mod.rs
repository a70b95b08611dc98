pub mod http_compositor;
