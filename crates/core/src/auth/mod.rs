pub mod access_token;
