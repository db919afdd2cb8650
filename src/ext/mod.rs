mod best_effort_path_ext;
mod relative_components_ext;

pub use best_effort_path_ext::BestEffortPathExt;
pub use relative_components_ext::RelativeComponentsExt;
