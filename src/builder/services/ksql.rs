use super::HTTP_TLS_KEYS;
use crate::builder::shared::{self, https_listener_tls, str_or_null};
use crate::builder::{BuildContext, PropertyReader, ServiceBuilder};
use crate::catalog::Service;
use crate::inventory::Fragment;

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::Ksql, "ksql")
        .transform("listener", listener)
        .transform("service_id", service_id)
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

fn service_id(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    context.fragment().with(
        context.var("service_id"),
        str_or_null(reader.get("ksql.service.id")),
    )
}

fn replication_factor(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::replication_factor(
        context,
        reader,
        "ksql.internal.topic.replicas",
        "default_internal_replication_factor",
    )
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    https_listener_tls(context, reader, "listeners", &HTTP_TLS_KEYS)
}

fn mutual_tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::mutual_tls(context, reader, "ssl.client.authentication", "REQUIRED")
}

fn rbac(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::rbac(context, reader, "ksql.security.extension.class", |_| true)
}

fn ldap(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::ldap(context, reader, "confluent.metadata.basic.auth.user.info")
}
