mod helpers;
mod login;
mod qr_login;
