use systemd_journal_logger::{connected_to_journal, JournalLog};

pub fn init_logger() {
    if connected_to_journal() {
        let installed = JournalLog::new().and_then(|journal| {
            journal
                .add_extra_field("VERSION", env!("CARGO_PKG_VERSION"))
                .install()
                .map_err(std::io::Error::other)
        });
        match installed {
            Ok(()) => {
                log::set_max_level(log::LevelFilter::Info);
                return;
            }
            Err(err) => eprintln!("could not log to the journal: {err}"),
        }
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
