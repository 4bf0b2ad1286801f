pub const APP_KUBERNETES_IO_MANAGED_BY_VALUE: &str = "elasticsearch-operator";
