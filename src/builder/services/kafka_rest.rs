use super::HTTP_TLS_KEYS;
use crate::builder::shared::{self, https_listener_tls};
use crate::builder::{BuildContext, PropertyReader, ServiceBuilder};
use crate::catalog::Service;
use crate::inventory::Fragment;

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::KafkaRest, "kafka_rest")
        .transform("listener", listener)
        .transform("tls", tls)
        .transform("mutual_tls", mutual_tls)
        .transform("rbac", rbac)
        .transform("ldap", ldap)
        .transform("monitoring_interceptor", monitoring_interceptor)
        .transform("telemetry", shared::telemetry)
        .transform("jmx", shared::jmx)
}

fn listener(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::listener(context, reader, "listeners", "http_protocol", "port")
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    https_listener_tls(context, reader, "listeners", &HTTP_TLS_KEYS)
}

fn mutual_tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::mutual_tls(context, reader, "ssl.client.auth", "true")
}

fn rbac(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::rbac(context, reader, "kafka.rest.resource.extension.class", |_| true)
}

fn ldap(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::ldap(context, reader, "confluent.metadata.basic.auth.user.info")
}

fn monitoring_interceptor(
    context: &BuildContext<'_>,
    reader: &mut PropertyReader<'_>,
) -> Fragment {
    shared::interceptors(context, reader, "consumer.interceptor.classes")
}
