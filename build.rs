fn main() {
    // ESP-IDF environment is only needed when building the device binary.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
