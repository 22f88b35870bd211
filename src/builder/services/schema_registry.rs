use super::HTTP_TLS_KEYS;
use crate::builder::shared::{self, https_listener_tls};
use crate::builder::{BuildContext, PropertyReader, ServiceBuilder};
use crate::catalog::Service;
use crate::inventory::Fragment;

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::SchemaRegistry, "schema_registry")
        .transform("listener", listener)
        .transform("replication_factor", replication_factor)
        .transform("tls", tls)
        .transform("mutual_tls", mutual_tls)
        .transform("rbac", rbac)
        .transform("ldap", ldap)
        .transform("telemetry", shared::telemetry)
        .transform("jmx", shared::jmx)
}

fn listener(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::listener(context, reader, "listeners", "http_protocol", "listener_port")
}

fn replication_factor(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::replication_factor(
        context,
        reader,
        "kafkastore.topic.replication.factor",
        "default_internal_replication_factor",
    )
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    https_listener_tls(context, reader, "listeners", &HTTP_TLS_KEYS)
}

fn mutual_tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::mutual_tls(context, reader, "ssl.client.auth", "true")
}

fn rbac(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::rbac(
        context,
        reader,
        "schema.registry.resource.extension.class",
        |class| class.contains("SchemaRegistrySecurityResourceExtension"),
    )
}

fn ldap(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::ldap(context, reader, "confluent.metadata.basic.auth.user.info")
}
