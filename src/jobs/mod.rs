pub mod revoked_token_cleaner;
