use crate::effect::Effect;
use crate::error::BoxError;

/// A request/response collaborator, such as an HTTP client, sending
/// `Request`s.
///
/// Any `Fn(Request) -> Result<Response, E>` is a transport, which keeps test
/// doubles one closure long.
pub trait Transport<Request> {
    /// What comes back.
    type Response;
    /// Why a request failed.
    type Error: Into<BoxError>;

    /// Performs one request.
    ///
    /// # Errors
    ///
    /// Whatever the underlying collaborator reports.
    fn send(&self, request: Request) -> Result<Self::Response, Self::Error>;
}

impl<Function, Request, Response, E> Transport<Request> for Function
where
    Function: Fn(Request) -> Result<Response, E>,
    E: Into<BoxError>,
{
    type Response = Response;
    type Error = E;

    fn send(&self, request: Request) -> Result<Response, E> {
        self(request)
    }
}

impl<A: 'static> Effect<A> {
    /// Sends the present value through `transport`; a transport error fails
    /// the chain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use effectum::effect::Effect;
    ///
    /// let echo = |path: String| -> Result<String, String> {
    ///     if path.starts_with('/') { Ok(format!("200 {path}")) } else { Err(format!("bad path {path}")) }
    /// };
    ///
    /// let outcome = Effect::pure("/health".to_string()).send(echo).run();
    /// assert_eq!(outcome.unwrap(), Some("200 /health".to_string()));
    /// ```
    pub fn send<T>(self, transport: T) -> Effect<T::Response>
    where
        T: Transport<A> + 'static,
        T::Response: 'static,
    {
        self.attempt_map(move |request: A| transport.send(request))
    }
}
