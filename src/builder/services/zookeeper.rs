//! ZooKeeper ensemble properties.
//!
//! `tls` overwrites `zookeeper_client_port` with the secure port when one is
//! configured.
use crate::builder::shared::{self, int_or_null, TlsKeys};
use crate::builder::{BuildContext, PropertyReader, ServiceBuilder};
use crate::catalog::Service;
use crate::inventory::Fragment;

const TLS_KEYS: TlsKeys = TlsKeys {
    keystore_location: "ssl.keyStore.location",
    keystore_password: "ssl.keyStore.password",
    key_password: "ssl.keyStore.password",
    truststore_location: "ssl.trustStore.location",
    truststore_password: "ssl.trustStore.password",
};

pub(crate) fn builder() -> ServiceBuilder {
    ServiceBuilder::new(Service::Zookeeper, "zookeeper")
        .transform("client_port", client_port)
        .transform("tls", tls)
        .transform("mutual_tls", mutual_tls)
        .transform("jmx", shared::jmx)
}

fn client_port(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let port = reader
        .get("clientPort")
        .and_then(|port| port.trim().parse::<u16>().ok());
    context
        .fragment()
        .with(context.var("client_port"), shared::port_or_default(context, port))
}

fn tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    let Some(secure_port) = reader.get("secureClientPort") else {
        return context.fragment();
    };
    let mut fragment = shared::tls(context, reader, &TLS_KEYS);
    fragment.insert(context.var("ssl_enabled"), true);
    fragment.insert(context.var("client_port"), int_or_null(Some(secure_port)));
    fragment
}

fn mutual_tls(context: &BuildContext<'_>, reader: &mut PropertyReader<'_>) -> Fragment {
    shared::mutual_tls(context, reader, "ssl.clientAuth", "need")
}
