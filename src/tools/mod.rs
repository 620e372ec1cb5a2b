pub mod login_clicker;
