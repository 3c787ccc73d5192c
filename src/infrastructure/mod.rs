pub mod gzip_codec;
pub mod http_transport;
pub mod token_provider;
