pub mod png_qr_code_renderer;
