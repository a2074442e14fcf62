mod helpers;

mod host {
    mod create;
    mod lifecycle;
    mod servers;
}

mod error {
    mod host;
}
