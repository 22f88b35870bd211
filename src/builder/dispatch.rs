use super::{BuildContext, MappedKeys, PropertyReader, ServiceBuilder};
use crate::inventory::Fragment;
use crate::properties::PropertiesMap;

/// Fragments and considered keys produced by one transform sweep.
#[derive(Debug, Default)]
pub struct BuildPass {
    pub fragments: Vec<Fragment>,
    pub mapped: MappedKeys,
}

/// Invoke every registered transform once, in registration order.
pub fn run_transforms(
    builder: &ServiceBuilder,
    context: &BuildContext<'_>,
    snapshot: &PropertiesMap,
) -> BuildPass {
    let mut pass = BuildPass::default();
    for transform in builder.transforms() {
        let mut reader = PropertyReader::new(snapshot, &mut pass.mapped);
        let fragment = (transform.apply)(context, &mut reader);
        tracing::debug!(
            service = %builder.service(),
            builder = builder.name(),
            transform = transform.name,
            group = %fragment.group,
            variables = fragment.properties.len(),
            empty = fragment.is_empty(),
            "transform applied"
        );
        pass.fragments.push(fragment);
    }
    tracing::debug!(
        service = %builder.service(),
        considered = pass.mapped.len(),
        "transforms complete"
    );
    pass
}
