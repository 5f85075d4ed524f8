use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::{Disposable, ErrorHandler, EventBus, Handler};
use crate::{Args, Payload, PromiseError};

type Settle<A, E> = Arc<Mutex<Option<oneshot::Sender<Result<A, E>>>>>;

impl<A, R, E> EventBus<A, R, E>
where
    A: Clone + Send + 'static,
    R: Default + 'static,
    E: Clone + Send + 'static,
{
    /// Возвращает future, который разрешится аргументами следующего `emit`
    /// на канале или отклонится значением следующего `error`.
    ///
    /// Под капотом — одна одноразовая запись с парой обработчиков
    /// (resolve/reject), поэтому срабатывание одного снимает оба. Пока
    /// future не разрешён, его обработчик участвует в `gather` и
    /// возвращает `R::default()`.
    ///
    /// Drop неразрешённого [`Pending`] снимает подписку.
    pub fn promise(
        &self,
        channel: &str,
    ) -> Pending<A, E> {
        let (tx, rx) = oneshot::channel();
        let settle: Settle<A, E> = Arc::new(Mutex::new(Some(tx)));

        let on_emit = Arc::clone(&settle);
        let resolve = Handler::new(move |args: &A| {
            if let Some(tx) = on_emit.lock().take() {
                let _ = tx.send(Ok(args.clone()));
            }
            R::default()
        });
        let reject = ErrorHandler::new(move |reason: &E| {
            if let Some(tx) = settle.lock().take() {
                let _ = tx.send(Err(reason.clone()));
            }
        });

        let guard = self.attach(channel, resolve, Some(reject), true);
        Pending {
            channel: Arc::clone(guard.channel()),
            rx,
            guard,
        }
    }
}

/// Future одноразового ожидания события, см. [`EventBus::promise`].
#[must_use = "futures do nothing unless awaited"]
#[derive(Debug)]
pub struct Pending<A, E> {
    channel: Arc<str>,
    rx: oneshot::Receiver<Result<A, E>>,
    guard: Disposable,
}

impl<A, E> Pending<A, E> {
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl<E> Pending<Args, E> {
    /// Ждёт событие и отдаёт одно значение: единственный или первый
    /// аргумент, `Payload::Null` для пустого `emit`.
    pub async fn into_value(self) -> Result<Payload, PromiseError<E>> {
        self.await.map(Args::into_value)
    }
}

impl<A, E> Future for Pending<A, E> {
    type Output = Result<A, PromiseError<E>>;

    fn poll(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Self::Output> {
        let this = &mut *self;
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(reason))) => Poll::Ready(Err(PromiseError::Rejected(reason))),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PromiseError::Abandoned {
                channel: Arc::clone(&this.channel),
            })),
        }
    }
}

impl<A, E> Drop for Pending<A, E> {
    fn drop(&mut self) {
        self.guard.dispose();
    }
}
