#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use env_logger::{Builder, Env};
use langdetect::{AppConfig, FsModelStore, ModelStore, TrainerConfig};

pub const LANGUAGES: [&str; 6] = ["English", "German", "Spanish", "Italian", "Romanian", "French"];

pub const TRAINING_ROWS: &[(&str, &str)] = &[
    ("English", "Hi there, this is Anna speaking."),
    ("English", "The weather is lovely today, isn't it?"),
    ("English", "I would like a cup of tea with milk."),
    ("English", "Where is the nearest train station?"),
    ("German", "Hallo, hier spricht Anna."),
    ("German", "Das Wetter ist heute wunderschön."),
    ("German", "Ich hätte gern eine Tasse Tee mit Milch."),
    ("German", "Wo ist der nächste Bahnhof?"),
    ("Spanish", "Hola, habla Anna."),
    ("Spanish", "El tiempo está precioso hoy."),
    ("Spanish", "Quisiera una taza de té con leche."),
    ("Spanish", "¿Dónde está la estación de tren más cercana?"),
    ("Italian", "Ciao, sono Anna al telefono."),
    ("Italian", "Il tempo è bellissimo oggi."),
    ("Italian", "Vorrei una tazza di tè con latte."),
    ("Italian", "Dov'è la stazione ferroviaria più vicina?"),
    ("Romanian", "Bună, aici vorbește Anna."),
    ("Romanian", "Vremea este minunată astăzi."),
    ("Romanian", "Aș dori o ceașcă de ceai cu lapte."),
    ("Romanian", "Unde este cea mai apropiată gară?"),
    ("French", "Bonjour, c'est Anna à l'appareil."),
    ("French", "Il fait très beau aujourd'hui."),
    ("French", "Je voudrais une tasse de thé au lait."),
    ("French", "Où est la gare la plus proche?"),
];

pub const TEST_ROWS: &[(&str, &str)] = &[
    ("English", "Hi there, this is Dirk speaking."),
    ("German", "Hallo, mein Name ist Dirk."),
    ("Spanish", "Hola, mi nombre es Dirk."),
    ("Italian", "Ciao, mi chiamo Dirk."),
    ("Romanian", "Bună ziua, numele meu este Dirk."),
    ("French", "Bonjour, je m'appelle Dirk."),
];

pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

pub fn write_tsv(dir: &Path, name: &str, rows: &[(&str, &str)]) -> PathBuf {
    let path = dir.join(name);
    let body: String = rows.iter().map(|(label, text)| format!("{}\t{}\n", label, text)).collect();
    std::fs::write(&path, body).unwrap();
    path
}

/// Small and fast, still deterministic.
pub fn quick_config(dir: &Path) -> AppConfig {
    AppConfig {
        training_path: write_tsv(dir, "training.tsv", TRAINING_ROWS),
        test_path: write_tsv(dir, "test.tsv", TEST_ROWS),
        model_path: dir.join("Learned").join("model.zip"),
        trainer: TrainerConfig {
            iterations: 20,
            max_depth: 3,
            ..TrainerConfig::default()
        },
        ..AppConfig::default()
    }
}

/// Filesystem store that counts artifact reads.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: FsModelStore,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ModelStore for CountingStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.inner.write(path, bytes)
    }
}
