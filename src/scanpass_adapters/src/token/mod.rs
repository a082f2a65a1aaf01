pub mod jwt_token_codec;
