pub mod forge;

pub use forge::{ForgeClient, LoaderManifest, LoaderOverride, Promotions, FORGE_MAVEN};
