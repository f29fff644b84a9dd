use book_api::config::AppConfig;

#[rocket::launch]
fn rocket() -> _ {
    book_api::init_logger();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("{}", err);
            std::process::exit(1);
        }
    };

    match book_api::rocket(config) {
        Ok(rocket) => rocket,
        Err(err) => {
            log::error!("startup failed: {}", err);
            std::process::exit(1);
        }
    }
}
