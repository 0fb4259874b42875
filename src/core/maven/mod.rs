mod artifact;

pub use artifact::MavenArtifact;

/// Default host for loader libraries that carry no repository url.
pub const MOJANG_LIBRARIES: &str = "https://libraries.minecraft.net";
