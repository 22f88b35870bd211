use crate::builder::shared::{self, https_listener_tls, TlsKeys};
use crate::builder::{BuildContext, PropertyReader, ServiceBuilder};
use crate::catalog::Service;
use crate::inventory::Fragment;

const LISTENERS: &str = "confluent.controlcenter.rest.listeners";

const TLS_KEYS: TlsKeys = TlsKeys {
    keystore_location: "confluent.controlcenter.rest.ssl.keystore.location",
    keystore_password: "confluent.controlcenter.rest.ssl.keystore.password",
    key_password: "confluent.controlcenter.rest.ssl.key.password",
    truststore_location: "confluent.controlcenter.rest.ssl.truststore.location",
    truststore_password: "confluent.controlcenter.rest.ssl.truststore.password",
};

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::ControlCenter, "control_center")
        .transform("listener", listener)
        .transform("replication_factor", replication_factor)
        .transform("tls", tls)
        .transform("rbac", rbac)
        .transform("ldap", ldap)
        .transform("telemetry", shared::telemetry)
        .transform("jmx", shared::jmx)
}

fn listener(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::listener(context, reader, LISTENERS, "http_protocol", "port")
}

fn replication_factor(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::replication_factor(
        context,
        reader,
        "confluent.controlcenter.internal.topics.replication",
        "default_internal_replication_factor",
    )
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    https_listener_tls(context, reader, LISTENERS, &TLS_KEYS)
}

fn rbac(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::rbac(
        context,
        reader,
        "confluent.controlcenter.rest.authentication.method",
        |method| method.eq_ignore_ascii_case("BEARER"),
    )
}

fn ldap(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::ldap(
        context,
        reader,
        "confluent.metadata.basic.auth.user.info",
    )
}
